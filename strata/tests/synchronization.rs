mod common;

use std::time::Duration;

use glam::Vec4;
use strata::types::GradientAtrousPassParams;
use strata::{
    Access, Command, CommandRecorder, ComputePass, Dispatch, Error, ErrorKind,
    FrameSlot, GpuApi, ImageBank, ImageHandle, ImageName, Kernel, QueueClass,
    SoftwareDevice, Submission,
};

use self::common::*;

fn setup() -> (SoftwareDevice, ImageBank) {
    let mut gpu = SoftwareDevice::default();
    let mut bank = ImageBank::new();

    bank.on_resize(&mut gpu, SIZE).unwrap();

    (gpu, bank)
}

fn dispatch(
    bank: &ImageBank,
    label: &str,
    read: ImageHandle,
    write: ImageHandle,
) -> Dispatch {
    Dispatch {
        label: label.into(),
        kernel: Kernel::GradientAtrous,
        reads: vec![read],
        writes: vec![write],
        size: bank.extent(ImageName::DisPingGradient),
        params: 0u32.to_le_bytes().to_vec(),
    }
}

fn barriers(recorder: &CommandRecorder) -> usize {
    recorder
        .commands()
        .iter()
        .filter(|command| matches!(command, Command::Barrier(_)))
        .count()
}

#[test]
fn missing_barrier_is_rejected() {
    let (mut gpu, bank) = setup();
    let slot = FrameSlot::FIRST;
    let ping = bank.resolve(ImageName::DisPingGradient, slot);
    let pong = bank.resolve(ImageName::DisPongGradient, slot);
    let mut recorder = CommandRecorder::new(slot, QueueClass::Graphics);

    recorder.dispatch(dispatch(&bank, "a", ping, pong));
    recorder.dispatch(dispatch(&bank, "b", pong, ping));

    let err = gpu
        .submit(QueueClass::Graphics, recorder.finish(), &Submission::default())
        .unwrap_err();

    assert_eq!(ErrorKind::PreconditionViolation, err.kind());

    let Error::MissingBarrier { pass, previous, .. } = err else {
        panic!("expected a missing barrier");
    };

    assert_eq!("b", pass);
    assert_eq!("a", previous);

    // Same thing, but synchronized
    recorder.dispatch(dispatch(&bank, "a", ping, pong));
    recorder.barrier([(pong, Access::ReadOnly), (ping, Access::ReadWrite)]);
    recorder.dispatch(dispatch(&bank, "b", pong, ping));

    gpu.submit(QueueClass::Graphics, recorder.finish(), &Submission::default())
        .unwrap();

    gpu.wait_idle().unwrap();

    assert_eq!(2, gpu.stats().dispatches);
    assert_eq!(2, gpu.stats().barriers);
}

#[test]
fn barrier_towards_reads_doesnt_cover_writes() {
    let (mut gpu, bank) = setup();
    let slot = FrameSlot::FIRST;
    let ping = bank.resolve(ImageName::DisPingGradient, slot);
    let pong = bank.resolve(ImageName::DisPongGradient, slot);
    let mut recorder = CommandRecorder::new(slot, QueueClass::Graphics);

    recorder.dispatch(dispatch(&bank, "a", ping, pong));
    recorder.barrier([(pong, Access::ReadOnly)]);
    recorder.dispatch(dispatch(&bank, "b", ping, pong));

    let err = gpu
        .submit(QueueClass::Graphics, recorder.finish(), &Submission::default())
        .unwrap_err();

    let Error::MissingBarrier { pass, previous, .. } = err else {
        panic!("expected a missing barrier");
    };

    assert_eq!("b", pass);
    assert_eq!("a", previous);
}

#[test]
fn queues_are_ordered_by_semaphores() {
    let (mut gpu, bank) = setup();
    let slot = FrameSlot::FIRST;
    let ping = bank.resolve(ImageName::DisPingGradient, slot);
    let pong = bank.resolve(ImageName::DisPongGradient, slot);
    let size = bank.extent(ImageName::DisPingGradient);
    let texels = vec![Vec4::ONE; (size.x * size.y) as usize];
    let semaphore = gpu.create_semaphore().unwrap();
    let mut transfer = CommandRecorder::new(slot, QueueClass::Transfer);
    let mut graphics = CommandRecorder::new(slot, QueueClass::Graphics);

    transfer.upload(ping, texels.clone());

    gpu.submit(QueueClass::Transfer, transfer.finish(), &Default::default())
        .unwrap();

    graphics.dispatch(dispatch(&bank, "a", ping, pong));

    let err = gpu
        .submit(QueueClass::Graphics, graphics.finish(), &Default::default())
        .unwrap_err();

    assert_eq!(ErrorKind::PreconditionViolation, err.kind());

    let Error::UnorderedSubmission {
        image,
        queue,
        previous,
    } = err
    else {
        panic!("expected an unordered submission");
    };

    assert_eq!(gpu.label(ping), image);
    assert_eq!(QueueClass::Graphics, queue);
    assert_eq!("Transfer submission #1", previous);

    // Same thing, but synchronized
    transfer.upload(ping, texels.clone());

    gpu.submit(
        QueueClass::Transfer,
        transfer.finish(),
        &Submission {
            signal: vec![semaphore],
            ..Default::default()
        },
    )
    .unwrap();

    graphics.dispatch(dispatch(&bank, "a", ping, pong));

    gpu.submit(
        QueueClass::Graphics,
        graphics.finish(),
        &Submission {
            wait_on: vec![semaphore],
            ..Default::default()
        },
    )
    .unwrap();

    // Overwriting what the graphics queue still reads is a hazard too
    transfer.upload(ping, texels.clone());

    let err = gpu
        .submit(QueueClass::Transfer, transfer.finish(), &Default::default())
        .unwrap_err();

    let Error::UnorderedSubmission { previous, .. } = err else {
        panic!("expected an unordered submission");
    };

    assert_eq!("Graphics submission #1", previous);

    // ... unless the host knows that work is done
    gpu.wait_idle().unwrap();
    transfer.upload(ping, texels);

    gpu.submit(QueueClass::Transfer, transfer.finish(), &Default::default())
        .unwrap();
}

#[test]
fn fences_order_queues() {
    let (mut gpu, bank) = setup();
    let slot = FrameSlot::FIRST;
    let ping = bank.resolve(ImageName::DisPingGradient, slot);
    let pong = bank.resolve(ImageName::DisPongGradient, slot);
    let size = bank.extent(ImageName::DisPingGradient);
    let fence = gpu.create_fence(false).unwrap();
    let mut transfer = CommandRecorder::new(slot, QueueClass::Transfer);
    let mut graphics = CommandRecorder::new(slot, QueueClass::Graphics);

    graphics.dispatch(dispatch(&bank, "a", ping, pong));

    gpu.submit(
        QueueClass::Graphics,
        graphics.finish(),
        &Submission {
            fence: Some(fence),
            ..Default::default()
        },
    )
    .unwrap();

    assert!(gpu.wait_for_fence(fence, Duration::from_secs(1)).unwrap());

    transfer.upload(pong, vec![Vec4::ZERO; (size.x * size.y) as usize]);

    gpu.submit(QueueClass::Transfer, transfer.finish(), &Default::default())
        .unwrap();
}

#[test]
fn reads_dont_require_barriers() {
    use ImageName::*;

    let (mut gpu, bank) = setup();
    let slot = FrameSlot::FIRST;
    let mut recorder = CommandRecorder::new(slot, QueueClass::Graphics);

    let passes = [DiffPingColorAndVariance, DiffPongColorAndVariance].map(|dst| {
        ComputePass::<GradientAtrousPassParams>::builder(dst.label())
            .read([DiffAccumColor.curr()])
            .write([dst.curr()])
            .build(Kernel::GradientAtrous)
    });

    for pass in &passes {
        pass.run(&bank, &mut recorder, slot, Default::default());
    }

    assert_eq!(0, barriers(&recorder));

    // Writing what's been read does need one, though
    ComputePass::<GradientAtrousPassParams>::builder("overwrite")
        .read([DiffPingColorAndVariance.curr()])
        .write([DiffAccumColor.curr()])
        .build(Kernel::GradientAtrous)
        .run(&bank, &mut recorder, slot, Default::default());

    assert_eq!(1, barriers(&recorder));

    gpu.submit(QueueClass::Graphics, recorder.finish(), &Submission::default())
        .unwrap();
}

#[test]
#[should_panic(expected = "more than once")]
fn aliased_bindings_panic() {
    let (mut gpu, bank) = setup();
    let slot = FrameSlot::FIRST;
    let ping = bank.resolve(ImageName::DisPingGradient, slot);
    let mut recorder = CommandRecorder::new(slot, QueueClass::Graphics);

    recorder.dispatch(dispatch(&bank, "a", ping, ping));

    let _ = gpu.submit(
        QueueClass::Graphics,
        recorder.finish(),
        &Submission::default(),
    );
}

#[test]
fn frames_pass_validation() {
    let mut target = orchestrator(TestScene {
        noise: 0.25,
        ..Default::default()
    });

    render(&mut target, 4);
    target.wait_idle().unwrap();

    let stats = target.gpu().stats();

    // Transfer and graphics queue, each frame
    assert_eq!(8, stats.submissions);
    assert_eq!(4 * 14, stats.dispatches);
    assert!(stats.barriers > 0);
}

#[test]
fn doubled_images_alternate_between_frames() {
    let mut target = orchestrator(TestScene::default());

    render(&mut target, 1);

    let even = (
        target.image(ImageName::AccumHistoryLength),
        target.image(ImageName::Final),
    );

    render(&mut target, 1);

    let odd = (
        target.image(ImageName::AccumHistoryLength),
        target.image(ImageName::Final),
    );

    render(&mut target, 1);

    let even_again = (
        target.image(ImageName::AccumHistoryLength),
        target.image(ImageName::Final),
    );

    assert_ne!(even.0, odd.0);
    assert_eq!(even.0, even_again.0);
    assert_eq!(even.1, odd.1);
    assert_eq!(odd.1, even_again.1);
}
