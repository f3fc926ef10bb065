//! Hot-swap tests: programs installed from one thread while another renders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use shiftwave::engine::{quantize, EngineError, Synth};
use shiftwave::presets::PresetBank;

/// Each buffer is rendered against exactly one program.
#[test]
fn buffers_never_mix_programs() {
    let mut synth = Synth::new(PresetBank::builtin());
    synth.compile_and_install("0").unwrap();

    let mut renderer = synth.renderer();
    let done = Arc::new(AtomicBool::new(false));
    let render_thread = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut buffers = 0usize;
            let mut buf = [0i16; 256];
            while !done.load(Ordering::Relaxed) || buffers < 100 {
                renderer.render(&mut buf);
                let first = buf[0];
                assert!(
                    buf.iter().all(|&s| s == first),
                    "buffer mixed two programs"
                );
                buffers += 1;
            }
            buffers
        })
    };

    for i in 0..2_000u32 {
        synth.compile_and_install(&(i % 256).to_string()).unwrap();
    }
    done.store(true, Ordering::Relaxed);

    let buffers = render_thread.join().unwrap();
    assert!(buffers >= 100);
    assert_eq!(synth.generation(), 2_001);
    assert_eq!(synth.active_program().as_deref(), Some("207"));
}

#[test]
fn preset_cycling_while_rendering() {
    let mut synth = Synth::new(PresetBank::builtin());
    synth.select_preset(1).unwrap();

    let mut renderer = synth.renderer();
    let done = Arc::new(AtomicBool::new(false));
    let render_thread = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut buf = vec![0i16; 512];
            while !done.load(Ordering::Relaxed) {
                renderer.render(&mut buf);
            }
            renderer.transport().timeline()
        })
    };

    for _ in 0..300 {
        synth.next_preset().unwrap();
    }
    done.store(true, Ordering::Relaxed);

    let timeline = render_thread.join().unwrap();
    assert!(timeline > 0.0);
    assert_eq!(synth.current_preset(), Some(1));
    synth.shutdown();
}

#[test]
fn rejected_program_leaves_active_one_rendering() {
    let mut synth = Synth::new(PresetBank::builtin());
    synth.compile_and_install("200").unwrap();
    let mut renderer = synth.renderer();

    let err = synth.compile_and_install("q").unwrap_err();
    assert!(matches!(err, EngineError::Compile(_)));
    assert!(err.to_string().contains("unknown identifier 'q'"));

    assert!(renderer
        .render_frames(32)
        .iter()
        .all(|&s| s == quantize(200.0)));
    assert_eq!(synth.active_program().as_deref(), Some("200"));
}

#[test]
fn partial_parses_never_install() {
    let mut synth = Synth::new(PresetBank::builtin());
    synth.compile_and_install("t").unwrap();
    let generation = synth.generation();

    for bad in ["(t", "t ?", "t ? 1", "sin(t", "t t", "t $ 1", "", "return ;"] {
        assert!(synth.compile_and_install(bad).is_err(), "{bad:?} compiled");
    }
    assert_eq!(synth.generation(), generation);
    assert_eq!(synth.active_program().as_deref(), Some("t"));
}
