pub mod bootstrap;
pub mod commands;
pub mod query_cache;
pub mod session;
pub mod wellness_sync;

#[cfg(test)]
pub(crate) mod test_support;
