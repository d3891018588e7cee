use glam::{UVec2, Vec4};
use strata_gpu::{GeometryMatchMap, STRATA_SIZE};

/// How an image's extent follows the render resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizePolicy {
    Full,

    /// Render resolution divided by given factor, rounded up.
    Downscale(u32),

    SinglePixel,

    /// Extent independent of the render resolution.
    Fixed(UVec2),
}

impl SizePolicy {
    pub fn extent(&self, render_size: UVec2) -> UVec2 {
        match *self {
            SizePolicy::Full => render_size,
            SizePolicy::Downscale(factor) => {
                ((render_size + factor - 1) / factor).max(UVec2::ONE)
            }
            SizePolicy::SinglePixel => UVec2::ONE,
            SizePolicy::Fixed(size) => size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffering {
    /// A single physical image, shared by all frames.
    Single,

    /// Two physical images, one holding the current frame and the other one
    /// the previous.
    Doubled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSpec {
    pub format: wgpu::TextureFormat,
    pub size_policy: SizePolicy,
    pub buffering: Buffering,
}

impl ImageSpec {
    pub fn is_doubled(&self) -> bool {
        self.buffering == Buffering::Doubled
    }
}

/// Which frame's copy of an image is referred to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum History {
    Curr,
    Prev,
}

/// Named image, as seen from a particular frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub name: ImageName,
    pub history: History,
}

impl From<ImageName> for ImageRef {
    fn from(name: ImageName) -> Self {
        name.curr()
    }
}

const GRADIENT: SizePolicy = SizePolicy::Downscale(STRATA_SIZE);
const MATCHES: SizePolicy = SizePolicy::Fixed(GeometryMatchMap::SIZE);

macro_rules! catalog {
    ([ $( $name:ident => ($format:ident, $policy:expr, $buffering:ident), )* ]) => {
        /// Every image owned by [`crate::ImageBank`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ImageName {
            $( $name, )*
        }

        impl ImageName {
            pub const ALL: &'static [Self] = &[ $( Self::$name, )* ];

            pub fn spec(&self) -> ImageSpec {
                match self {
                    $(
                        Self::$name => ImageSpec {
                            format: wgpu::TextureFormat::$format,
                            size_policy: $policy,
                            buffering: Buffering::$buffering,
                        },
                    )*
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name), )*
                }
            }
        }
    };
}

catalog!([
    // Written by the producer
    Albedo => (Rgba8Unorm, SizePolicy::Full, Single),
    Normal => (Rg16Float, SizePolicy::Full, Doubled),
    NormalGeometry => (Rg16Float, SizePolicy::Full, Doubled),
    MetallicRoughness => (Rg8Unorm, SizePolicy::Full, Doubled),
    Depth => (R32Float, SizePolicy::Full, Doubled),
    DepthGrad => (R16Float, SizePolicy::Full, Single),
    Motion => (Rgba16Float, SizePolicy::Full, Single),
    SurfacePosition => (Rgba32Float, SizePolicy::Full, Doubled),
    VisibilityBuffer => (Rgba32Float, SizePolicy::Full, Doubled),
    RandomSeed => (R32Uint, SizePolicy::Full, Doubled),
    UnfilteredDirect => (Rgba16Float, SizePolicy::Full, Doubled),
    UnfilteredSpecular => (Rgba16Float, SizePolicy::Full, Doubled),
    UnfilteredIndirShR => (Rgba16Float, SizePolicy::Full, Doubled),
    UnfilteredIndirShG => (Rgba16Float, SizePolicy::Full, Doubled),
    UnfilteredIndirShB => (Rgba16Float, SizePolicy::Full, Doubled),

    // Geometry matching
    GeometryRecords => (Rg32Uint, MATCHES, Single),
    GeometryMatchPrev => (Rg32Uint, MATCHES, Doubled),

    // Gradients
    DisPingGradient => (Rgba16Float, GRADIENT, Single),
    DisPongGradient => (Rgba16Float, GRADIENT, Single),

    // Temporal accumulation
    DiffAccumColor => (Rgba16Float, SizePolicy::Full, Single),
    AccumMoments => (Rgba16Float, SizePolicy::Full, Doubled),
    DiffColorHistory => (Rgba16Float, SizePolicy::Full, Doubled),
    SpecAccumColor => (Rgba16Float, SizePolicy::Full, Doubled),
    IndirAccumShR => (Rgba16Float, SizePolicy::Full, Doubled),
    IndirAccumShG => (Rgba16Float, SizePolicy::Full, Doubled),
    IndirAccumShB => (Rgba16Float, SizePolicy::Full, Doubled),
    AccumHistoryLength => (Rgba16Float, SizePolicy::Full, Doubled),

    // Spatial filtering
    DiffPingColorAndVariance => (Rgba16Float, SizePolicy::Full, Single),
    DiffPongColorAndVariance => (Rgba16Float, SizePolicy::Full, Single),
    SpecPingColorAndVariance => (Rgba16Float, SizePolicy::Full, Single),
    SpecPongColorAndVariance => (Rgba16Float, SizePolicy::Full, Single),
    IndirPingShR => (Rgba16Float, SizePolicy::Full, Single),
    IndirPingShG => (Rgba16Float, SizePolicy::Full, Single),
    IndirPingShB => (Rgba16Float, SizePolicy::Full, Single),
    IndirPongShR => (Rgba16Float, SizePolicy::Full, Single),
    IndirPongShG => (Rgba16Float, SizePolicy::Full, Single),
    IndirPongShB => (Rgba16Float, SizePolicy::Full, Single),

    // Composition
    Final => (Rgba16Float, SizePolicy::Full, Single),
]);

impl ImageName {
    pub fn curr(self) -> ImageRef {
        ImageRef {
            name: self,
            history: History::Curr,
        }
    }

    pub fn prev(self) -> ImageRef {
        ImageRef {
            name: self,
            history: History::Prev,
        }
    }

    pub fn extent(&self, render_size: UVec2) -> UVec2 {
        self.spec().size_policy.extent(render_size)
    }

    /// Value the image is cleared to when its contents have to be
    /// discarded.
    pub fn clear_value(&self) -> Vec4 {
        match self {
            ImageName::VisibilityBuffer => strata_gpu::Visibility::none(),
            _ => Vec4::ZERO,
        }
    }
}
