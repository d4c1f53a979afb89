pub mod client;
pub mod gateway;

#[cfg(test)]
pub mod mock;
