mod passes;

use log::{debug, info, trace};

pub use self::passes::*;
use crate::{
    CommandRecorder, DenoiserConfig, FrameSlot, GeometryMatches, ImageBank,
    ImageName,
};

/// Images holding an accumulated signal carried from one frame to another.
///
/// When the denoiser sees a freshly allocated bank, previous copies of these
/// are cleared before anything gets to read them.
const HISTORY_IMAGES: [ImageName; 9] = [
    ImageName::VisibilityBuffer,
    ImageName::GeometryMatchPrev,
    ImageName::DiffColorHistory,
    ImageName::AccumMoments,
    ImageName::SpecAccumColor,
    ImageName::IndirAccumShR,
    ImageName::IndirAccumShG,
    ImageName::IndirAccumShB,
    ImageName::AccumHistoryLength,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Merged { slot: FrameSlot, history_valid: bool },
}

/// Spatiotemporal (SVGF with adaptive temporal gradients) denoiser.
///
/// Each frame goes through [`Self::merge_samples()`] and then
/// [`Self::denoise()`], both recorded into the same frame slot; afterwards
/// the denoised signals are available in [`Self::outputs()`].
#[derive(Debug)]
pub struct Denoiser {
    config: DenoiserConfig,
    passes: DenoiserPasses,
    state: State,

    /// Generation of the image bank the accumulated history belongs to.
    generation: Option<u32>,
}

impl Denoiser {
    pub fn new(config: DenoiserConfig) -> Self {
        info!("Initializing denoiser");

        Self {
            passes: DenoiserPasses::new(&config),
            config,
            state: State::Idle,
            generation: None,
        }
    }

    pub fn config(&self) -> &DenoiserConfig {
        &self.config
    }

    /// Replaces the configuration; accumulated history stays valid.
    pub fn set_config(&mut self, config: DenoiserConfig) {
        self.config = config;
        self.rebuild_passes();
    }

    pub fn rebuild_passes(&mut self) {
        assert_eq!(State::Idle, self.state, "passes rebuilt during a frame");

        debug!("Rebuilding denoiser passes");

        self.passes = DenoiserPasses::new(&self.config);
    }

    /// Returns whether the next frame is going to reuse accumulated history
    /// for given bank.
    pub fn has_history(&self, bank: &ImageBank) -> bool {
        self.generation == Some(bank.generation())
    }

    /// Merges producer's geometry matches with the previous frame's ones.
    ///
    /// Must be called after the producer's images for this frame have been
    /// recorded and before [`Self::denoise()`].
    pub fn merge_samples(
        &mut self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        matches: &GeometryMatches,
    ) {
        assert!(
            bank.is_sized(),
            "denoiser run before the image bank got sized"
        );
        assert_eq!(State::Idle, self.state, "merge_samples() called twice");

        let history_valid = self.has_history(bank);

        trace!("merge_samples(slot={slot}, history_valid={history_valid})");

        if !history_valid {
            debug!("Resetting history; generation={}", bank.generation());

            recorder.scope("strata_reset_history", |recorder| {
                for name in HISTORY_IMAGES {
                    bank.clear(recorder, slot, name.prev());
                }
            });

            self.generation = Some(bank.generation());
        }

        self.passes.merge_geometry.run(bank, recorder, slot, matches);

        self.state = State::Merged {
            slot,
            history_valid,
        };
    }

    /// Records the denoising stages for given slot.
    pub fn denoise(
        &mut self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
    ) {
        let history_valid = match self.state {
            State::Merged {
                slot: merged_slot,
                history_valid,
            } if merged_slot == slot => history_valid,

            _ => panic!("denoise() called without merge_samples()"),
        };

        assert!(
            self.has_history(bank),
            "image bank resized between merge_samples() and denoise()"
        );

        trace!("denoise(slot={slot}, history_valid={history_valid})");

        recorder.scope("strata_denoise", |recorder| {
            let passes = &self.passes;

            passes
                .gradient_samples
                .run(bank, recorder, slot, history_valid);

            passes.gradient_atrous.run(bank, recorder, slot);

            passes
                .temporal_accumulation
                .run(bank, recorder, slot, history_valid);

            passes.antifirefly.run(bank, recorder, slot);
            passes.variance_estimation.run(bank, recorder, slot);
            passes.spatial_atrous.run(bank, recorder, slot);
        });

        self.state = State::Idle;
    }

    /// Images holding the denoised diffuse, specular and indirect signals
    /// once [`Self::denoise()`] has been recorded.
    pub fn outputs() -> DenoiserOutputs {
        DenoiserOutputs {
            diffuse: ImageName::DiffPingColorAndVariance,
            specular: ImageName::SpecPingColorAndVariance,
            indirect: [
                ImageName::IndirPingShR,
                ImageName::IndirPingShG,
                ImageName::IndirPingShB,
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DenoiserOutputs {
    pub diffuse: ImageName,
    pub specular: ImageName,
    pub indirect: [ImageName; 3],
}
