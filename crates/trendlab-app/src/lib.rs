// Library root for the trend lab binary: exposes the report renderer so
// integration tests can drive it.

pub mod report;
