pub mod analyze;
pub mod ask;
pub mod ingest;

#[cfg(test)]
pub(crate) mod test_support;
