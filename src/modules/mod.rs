pub mod books;
pub mod home;

use bookshelf_kernel::ModuleRegistry;

use books::routes::SharedGateway;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, gateway: SharedGateway) {
    registry.register(books::create_module(gateway.clone()));
    registry.register(home::create_module(gateway));
}
