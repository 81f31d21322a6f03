use log::debug;

use crate::{Result, Settings};

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        $( mod $name; )*
        $( pub use self::$name::*; )*

        #[derive(Debug)]
        pub struct Passes {
            $( pub $name: $class, )*
        }

        impl Passes {
            pub fn new(settings: &Settings) -> Result<Self> {
                debug!("Initializing passes");

                Ok(Self {
                    $( $name: $class::new(settings)?, )*
                })
            }

            /// Reallocates LUTs whose resolution doesn't match the settings
            /// anymore.
            pub fn resize(&mut self, settings: &Settings) -> Result<()> {
                $( self.$name.resize(settings)?; )*

                Ok(())
            }
        }
    };
}

passes!([
    transmittance => TransmittancePass,
    multi_scattering => MultiScatteringPass,
    sky_view => SkyViewPass,
    aerial_perspective => AerialPerspectivePass,
]);
