// ── Bulk CSV import ──
//
// Loads entities from a delimited file instead of the network. Rows are
// buffered and flushed into the store in batches as clean (non-dirty)
// loads. The file needs a header row with at least `type` and `objid`
// (or `id`); `parentid` and `name` are optional, every other column
// becomes a property.

use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{ContentType, Entity, ObjectId};
use crate::store::EntityStore;

/// Header positions of the built-in columns.
struct Columns {
    headers: Vec<String>,
    content_type: usize,
    id: usize,
    parent_id: Option<usize>,
    name: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, CoreError> {
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        let find = |name: &str| headers.iter().position(|h| h == name);

        let content_type = find("type").ok_or_else(|| CoreError::Import {
            line: 1,
            reason: "missing 'type' column".into(),
        })?;
        let id = find("objid").or_else(|| find("id")).ok_or_else(|| CoreError::Import {
            line: 1,
            reason: "missing 'objid' column".into(),
        })?;
        let parent_id = find("parentid");
        let name = find("name");

        Ok(Self {
            headers,
            content_type,
            id,
            parent_id,
            name,
        })
    }

    fn is_builtin(&self, index: usize) -> bool {
        index == self.content_type
            || index == self.id
            || Some(index) == self.parent_id
            || Some(index) == self.name
            || self.headers[index] == "dirty"
    }
}

/// Import every row of a CSV file into `store`.
pub fn import_file(
    path: &Path,
    store: &mut EntityStore,
    config: &EngineConfig,
) -> Result<usize, CoreError> {
    let file = std::fs::File::open(path)?;
    let count = import_csv(file, store, config)?;
    info!(path = %path.display(), entities = count, "import finished");
    Ok(count)
}

/// Import every row of CSV data into `store`.
pub fn import_csv<R: io::Read>(
    reader: R,
    store: &mut EntityStore,
    config: &EngineConfig,
) -> Result<usize, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::from_headers(reader.headers().map_err(csv_error)?)?;

    let batch_size = config.import_batch_size.max(1);
    let mut buffer: Vec<Entity> = Vec::with_capacity(batch_size);
    let mut total = 0;

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        buffer.push(entity_from_record(&record, &columns, config)?);

        if buffer.len() >= batch_size {
            total += flush(&mut buffer, store);
        }
    }
    total += flush(&mut buffer, store);

    Ok(total)
}

fn flush(buffer: &mut Vec<Entity>, store: &mut EntityStore) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    debug!(rows = buffer.len(), "flushing import batch");
    store.put_all(buffer.drain(..), false)
}

fn entity_from_record(
    record: &csv::StringRecord,
    columns: &Columns,
    config: &EngineConfig,
) -> Result<Entity, CoreError> {
    let line = record.position().map_or(0, csv::Position::line);
    let invalid = |reason: String| CoreError::Import { line, reason };
    let field = |index: usize| record.get(index).unwrap_or_default();

    let raw_type = field(columns.content_type);
    let content_type: ContentType = raw_type
        .parse()
        .map_err(|_| invalid(format!("unknown type {raw_type:?}")))?;

    let raw_id = field(columns.id);
    let id: ObjectId = raw_id
        .parse()
        .map_err(|_| invalid(format!("invalid objid {raw_id:?}")))?;

    let mut entity = Entity::new(id, content_type, columns.name.map(field).unwrap_or_default());

    if let Some(index) = columns.parent_id {
        let raw = field(index);
        if !raw.is_empty() {
            entity.parent_id = Some(
                raw.parse()
                    .map_err(|_| invalid(format!("invalid parentid {raw:?}")))?,
            );
        }
    }

    for (index, value) in record.iter().enumerate() {
        if index >= columns.headers.len() || columns.is_builtin(index) {
            continue;
        }
        let property = &columns.headers[index];
        entity
            .properties
            .insert(property.clone(), config.schema.value_for(property, value));
    }

    Ok(entity)
}

fn csv_error(err: csv::Error) -> CoreError {
    CoreError::Import {
        line: err.position().map_or(0, csv::Position::line),
        reason: err.to_string(),
    }
}
