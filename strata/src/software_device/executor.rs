use std::mem;

use glam::Vec4;
use strata_gpu::Tex;

use super::SoftwareDevice;
use crate::{Command, Dispatch, Metrics};

pub struct Executor<'a> {
    device: &'a mut SoftwareDevice,
    metrics: Metrics,
}

impl<'a> Executor<'a> {
    pub fn new(device: &'a mut SoftwareDevice) -> Self {
        Self {
            device,
            metrics: Default::default(),
        }
    }

    pub fn run(mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Barrier(barriers) => {
                    self.device.stats.barriers += barriers.len();
                }

                Command::Dispatch(dispatch) => {
                    self.dispatch(dispatch);
                }

                Command::Upload { image, texels } => {
                    let image = self.device.image_mut(image);

                    assert_eq!(
                        image.texels.len(),
                        texels.len(),
                        "upload doesn't match size of image `{}`",
                        image.desc.label
                    );

                    image.texels = texels;
                    self.device.stats.uploads += 1;
                }

                Command::Clear { image, value } => {
                    self.device.image_mut(image).texels.fill(value);
                    self.device.stats.clears += 1;
                }

                Command::PushLabel(label) => {
                    self.metrics.begin(label);
                }

                Command::PopLabel => {
                    self.metrics.end();
                }
            }
        }
    }

    fn dispatch(&mut self, dispatch: Dispatch) {
        let mut outputs: Vec<Vec<Vec4>> = dispatch
            .writes
            .iter()
            .map(|&handle| {
                let image = self.device.image_mut(handle);

                assert_eq!(
                    dispatch.size, image.desc.size,
                    "pass `{}` writes image `{}` of different size",
                    dispatch.label, image.desc.label
                );

                mem::take(&mut image.texels)
            })
            .collect();

        {
            let inputs: Vec<_> = dispatch
                .reads
                .iter()
                .map(|&handle| {
                    let image = self.device.image(handle);

                    Tex::new(image.desc.size, &image.texels)
                })
                .collect();

            dispatch.kernel.execute(
                dispatch.size,
                &dispatch.params,
                &inputs,
                &mut outputs,
            );
        }

        for (&handle, texels) in dispatch.writes.iter().zip(outputs) {
            self.device.image_mut(handle).texels = texels;
        }

        self.device.stats.dispatches += 1;
    }
}
