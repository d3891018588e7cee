use log::debug;

use crate::DenoiserConfig;

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        $( mod $name; )*
        $( pub use self::$name::*; )*

        #[derive(Debug)]
        pub struct DenoiserPasses {
            $( pub $name: $class, )*
        }

        impl DenoiserPasses {
            pub fn new(config: &DenoiserConfig) -> Self {
                debug!("Initializing denoiser passes");

                Self {
                    $( $name: $class::new(config), )*
                }
            }
        }
    };
}

passes!([
    antifirefly => AntifireflyPass,
    gradient_atrous => GradientAtrousPass,
    gradient_samples => GradientSamplesPass,
    merge_geometry => MergeGeometryPass,
    spatial_atrous => SpatialAtrousPass,
    temporal_accumulation => TemporalAccumulationPass,
    variance_estimation => VarianceEstimationPass,
]);
