// LinkShelf state managers
// Managers own the stored collections: saved links and categories.

pub mod category_manager;
pub mod link_manager;
