// ── Domain model ──
//
// Canonical types for PRTG objects as the engine sees them. The API layer
// returns loosely typed table rows; `convert` and `import` turn them into
// these records.

mod content;
mod entity;
mod property;

pub use content::{ContentSelector, ContentType};
pub use entity::{Entity, ObjectId};
pub use property::{PropertySchema, PropertyValue};
