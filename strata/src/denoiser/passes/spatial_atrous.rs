use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, ImageBank,
    ImageName, ImageRef, Kernel,
};

const ATROUS_ITERATIONS: usize = gpu::ATROUS_ITERATIONS as usize;

/// Edge-avoiding à-trous wavelet filter.
///
/// The first iteration's diffuse output doubles as next frame's diffuse
/// history; the final result of all iterations ends up in the ping images.
#[derive(Debug)]
pub struct SpatialAtrousPass {
    passes: [ComputePass<gpu::SpatialAtrousPassParams>; ATROUS_ITERATIONS],
    params: gpu::SpatialAtrousPassParams,
}

impl SpatialAtrousPass {
    pub fn new(config: &DenoiserConfig) -> Self {
        use ImageName::*;

        struct Targets {
            diff: ImageName,
            spec: ImageName,
            indir: [ImageName; 3],
        }

        let ping = Targets {
            diff: DiffPingColorAndVariance,
            spec: SpecPingColorAndVariance,
            indir: [IndirPingShR, IndirPingShG, IndirPingShB],
        };

        let pong = Targets {
            diff: DiffPongColorAndVariance,
            spec: SpecPongColorAndVariance,
            indir: [IndirPongShR, IndirPongShG, IndirPongShB],
        };

        let history = Targets {
            diff: DiffColorHistory,
            ..pong
        };

        fn images(targets: &Targets) -> [ImageRef; 5] {
            [
                targets.diff.curr(),
                targets.spec.curr(),
                targets.indir[0].curr(),
                targets.indir[1].curr(),
                targets.indir[2].curr(),
            ]
        }

        let schedule = [
            (&ping, &history),
            (&history, &ping),
            (&ping, &pong),
            (&pong, &ping),
        ];

        let mut iteration = 0;

        let passes = schedule.map(|(src, dst)| {
            let [diff, spec, indir_r, indir_g, indir_b] = images(src);
            let label = format!("spatial_atrous_{iteration}");

            iteration += 1;

            ComputePass::builder(label)
                .read([
                    Normal.curr(),
                    Depth.curr(),
                    DepthGrad.curr(),
                    MetallicRoughness.curr(),
                    diff,
                    spec,
                    indir_r,
                    indir_g,
                    indir_b,
                ])
                .write(images(dst))
                .build(Kernel::SpatialAtrous)
        });

        let params = gpu::SpatialAtrousPassParams {
            iteration: 0,
            sigma_normal: config.sigma_normal,
            sigma_depth: config.sigma_depth,
            sigma_luminance: config.sigma_luminance,
            sigma_roughness: config.sigma_roughness,
        };

        Self { passes, params }
    }

    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
    ) {
        for (iteration, pass) in self.passes.iter().enumerate() {
            pass.run(
                bank,
                recorder,
                slot,
                gpu::SpatialAtrousPassParams {
                    iteration: iteration as u32,
                    ..self.params
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule() {
        use ImageName::*;

        let target = SpatialAtrousPass::new(&Default::default());

        let diffuse: Vec<_> = target
            .passes
            .iter()
            .map(|pass| (pass.reads()[4].name, pass.writes()[0].name))
            .collect();

        assert_eq!(
            vec![
                (DiffPingColorAndVariance, DiffColorHistory),
                (DiffColorHistory, DiffPingColorAndVariance),
                (DiffPingColorAndVariance, DiffPongColorAndVariance),
                (DiffPongColorAndVariance, DiffPingColorAndVariance),
            ],
            diffuse
        );

        let specular: Vec<_> = target
            .passes
            .iter()
            .map(|pass| pass.writes()[1].name)
            .collect();

        assert_eq!(
            vec![
                SpecPongColorAndVariance,
                SpecPingColorAndVariance,
                SpecPongColorAndVariance,
                SpecPingColorAndVariance,
            ],
            specular
        );
    }
}
