pub mod dispatcher;
pub mod order_service;

#[cfg(test)]
pub(crate) mod testing;
