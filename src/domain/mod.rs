pub mod batch;
pub mod history;
pub mod language;
pub mod record;
