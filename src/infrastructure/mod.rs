pub mod directory_repo;
pub mod models;
pub mod notifier;
pub mod order_repo;
pub mod outbox_repo;

#[cfg(test)]
pub(crate) mod test_support;
