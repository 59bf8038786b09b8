pub mod kubers;
pub mod model;
pub mod replicas;
#[cfg(test)]
pub mod stubs;
