use fxhash::FxHashMap;

use super::SoftwareDevice;
use crate::{
    Access, Command, CommandList, Dispatch, Error, ImageBarrier, ImageHandle,
    Result,
};

/// Checks that every hazard within a command list is guarded by a barrier.
pub struct Validator<'a> {
    device: &'a SoftwareDevice,
    pending: FxHashMap<ImageHandle, (Access, String)>,
}

impl<'a> Validator<'a> {
    pub fn new(device: &'a SoftwareDevice) -> Self {
        Self {
            device,
            pending: Default::default(),
        }
    }

    pub fn validate(mut self, commands: &CommandList) -> Result<()> {
        for command in &commands.commands {
            match command {
                Command::Barrier(barriers) => {
                    for barrier in barriers {
                        self.barrier(barrier);
                    }
                }

                Command::Dispatch(dispatch) => {
                    Self::check_aliasing(dispatch);

                    for &image in &dispatch.reads {
                        self.access(image, Access::ReadOnly, &dispatch.label)?;
                    }

                    for &image in &dispatch.writes {
                        self.access(image, Access::ReadWrite, &dispatch.label)?;
                    }
                }

                Command::Upload { image, .. } => {
                    self.access(*image, Access::ReadWrite, "upload")?;
                }

                Command::Clear { image, .. } => {
                    self.access(*image, Access::ReadWrite, "clear")?;
                }

                Command::PushLabel(_) | Command::PopLabel => {}
            }
        }

        Ok(())
    }

    /// A barrier towards reads only makes reads safe; whatever writes next
    /// still has to wait, so the hazard stays pending as a read.
    fn barrier(&mut self, barrier: &ImageBarrier) {
        match barrier.after {
            Access::ReadWrite => {
                self.pending.remove(&barrier.image);
            }

            Access::ReadOnly => {
                if let Some((access, _)) = self.pending.get_mut(&barrier.image)
                {
                    *access = Access::ReadOnly;
                }
            }
        }
    }

    fn check_aliasing(dispatch: &Dispatch) {
        for (idx, image) in dispatch.writes.iter().enumerate() {
            assert!(
                !dispatch.reads.contains(image)
                    && !dispatch.writes[idx + 1..].contains(image),
                "pass `{}` binds image {image} more than once",
                dispatch.label
            );
        }
    }

    fn access(
        &mut self,
        image: ImageHandle,
        access: Access,
        label: &str,
    ) -> Result<()> {
        // Panics on stale handles
        let image_label = self.device.label(image);

        if let Some((prev_access, prev_label)) = self.pending.get(&image) {
            if prev_access.conflicts_with(access) {
                return Err(Error::MissingBarrier {
                    pass: label.into(),
                    image: image_label.into(),
                    previous: prev_label.clone(),
                });
            }
        }

        match access {
            Access::ReadOnly => {
                self.pending
                    .entry(image)
                    .or_insert_with(|| (access, label.into()));
            }

            Access::ReadWrite => {
                self.pending.insert(image, (access, label.into()));
            }
        }

        Ok(())
    }
}
