pub mod components;
pub mod resources;

pub mod prelude {
    pub use super::components::*;
    pub use super::resources::*;
}
