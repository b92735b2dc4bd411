pub mod authors;
pub mod bookinstances;
pub mod books;
pub mod genres;
pub mod home;

use catalog_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every catalog module with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(home::create_module(state.clone()))?;
    registry.register(authors::create_module(state.clone()))?;
    registry.register(books::create_module(state.clone()))?;
    registry.register(genres::create_module(state.clone()))?;
    registry.register(bookinstances::create_module(state.clone()))?;
    Ok(())
}
