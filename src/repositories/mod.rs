// Repositories module - data access layer

pub mod dynamodb_store;
pub mod guest_repository;
pub mod memory_store;
pub mod repository;
pub mod room_repository;
pub mod store;
pub mod table_manager;


pub use dynamodb_store::DynamoDbStore;
pub use guest_repository::GuestRepository;
pub use memory_store::InMemoryStore;
pub use repository::{Entity, Repository};
pub use room_repository::RoomRepository;
pub use store::{AttributeFilter, DocumentStore, Item};
pub use table_manager::TableManager;
