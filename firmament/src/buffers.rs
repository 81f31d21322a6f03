mod bindable;
mod texture;

pub use self::bindable::*;
pub use self::texture::*;
