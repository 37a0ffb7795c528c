mod engine;

pub use engine::Inventory;
