use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use keysynth::{RecordingPoster, Stroke, Synthesizer};
use macro_engine::{
    Config, Error, ExecutorConfig, Key, KeyEvent, Macro, MacroScope, MacroService,
};
use parking_lot::Mutex;
use win_hook::{
    ModifierTracker,
    policy::{self, RawEvent, Verdict},
};
use winops::MockWindowQuery;

fn service() -> (MacroService, Arc<RecordingPoster>) {
    let poster = Arc::new(RecordingPoster::new());
    let config = Config {
        executor: ExecutorConfig {
            min_workers: 1,
            max_workers: 4,
            keep_alive_ms: 60_000,
            elevated_priority: false,
        },
        require_key: true,
    };
    let svc = MacroService::with_backends(
        config,
        Arc::new(MockWindowQuery::with_title("Game")),
        Synthesizer::with_poster(poster.clone()),
    )
    .expect("service");
    (svc, poster)
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

/// Turn synthesized strokes into what the hook would see for them.
fn as_hook_input(s: &Stroke) -> RawEvent {
    RawEvent {
        code: policy::HC_ACTION,
        message: if s.down {
            policy::WM_KEYDOWN
        } else {
            policy::WM_KEYUP
        },
        vk: u32::from(s.key.virtual_code()),
        scan: u32::from(s.scan_code()),
        flags: eventtag::INJECTED_FLAG,
        time: 0,
        extra: s.extra_info(),
    }
}

#[derive(Default)]
struct Counter {
    hits: AtomicUsize,
}

impl Macro for Counter {
    fn declare(self: Arc<Self>, m: &mut MacroScope) {
        m.when(Key::F5).consume().press().to(move |_| {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
}

#[test]
fn macro_types_activate_once() {
    let (svc, _) = service();
    assert!(svc.activate::<Counter>());
    assert!(!svc.activate::<Counter>());
    assert!(!svc.use_macro(Counter::default()));
    assert!(svc.is_active::<Counter>());
    assert_eq!(svc.registry().len(), 1);
}

#[test]
fn macro_state_is_shared_with_actions() {
    struct Probe(Arc<AtomicUsize>);
    impl Macro for Probe {
        fn declare(self: Arc<Self>, m: &mut MacroScope) {
            m.when_press(Key::F6).run(move || {
                self.0.fetch_add(1, Ordering::SeqCst);
            });
        }
        fn name(&self) -> &str {
            "probe"
        }
    }
    let (svc, _) = service();
    let hits = Arc::new(AtomicUsize::new(0));
    assert!(svc.use_macro(Probe(hits.clone())));
    let labels: Vec<String> = svc
        .registry()
        .list(macro_engine::Transition::Down)
        .snapshot()
        .iter()
        .map(|r| r.label().to_string())
        .collect();
    assert_eq!(labels, vec!["probe:press:f6".to_string()]);
    svc.dispatcher().dispatch(&KeyEvent::down(Key::F6));
    assert!(wait_for(|| hits.load(Ordering::SeqCst) == 1));
}

#[test]
fn synthesized_input_loops_back_as_self_injected() {
    let (svc, poster) = service();
    let seen: Arc<Mutex<Vec<KeyEvent>>> = Arc::default();
    let physical_hits = Arc::new(AtomicUsize::new(0));
    let s = seen.clone();
    let p = physical_hits.clone();
    svc.declare("loop", move |m| {
        m.when_press(Key::F2).consume().to(|ctx| ctx.press(Key::Q));
        m.when_press(Key::Q).to(move |ctx| {
            s.lock().push(*ctx.event());
            Ok(())
        });
        m.when_press(Key::Q).physical().run(move || {
            p.fetch_add(1, Ordering::SeqCst);
        });
    });

    let dispatcher = svc.dispatcher();
    let mut mods = ModifierTracker::new();
    let trigger = RawEvent {
        code: policy::HC_ACTION,
        message: policy::WM_KEYDOWN,
        vk: u32::from(Key::F2.virtual_code()),
        scan: u32::from(Key::F2.scan_code()),
        ..RawEvent::default()
    };
    assert_eq!(
        policy::route(&trigger, &mut mods, dispatcher.as_ref()),
        Verdict::Consume
    );
    assert!(wait_for(|| poster.strokes().len() == 2));

    for stroke in poster.strokes() {
        let verdict = policy::route(&as_hook_input(&stroke), &mut mods, dispatcher.as_ref());
        assert_eq!(verdict, Verdict::Forward);
    }
    assert!(wait_for(|| seen.lock().len() == 1));
    let ev = seen.lock()[0];
    assert!(ev.injected && ev.self_injected);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(physical_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn stop_interrupts_waiting_actions() {
    let (svc, _) = service();
    let interrupted = Arc::new(AtomicBool::new(false));
    let started = Arc::new(AtomicBool::new(false));
    let (i, st) = (interrupted.clone(), started.clone());
    svc.declare("wait", move |m| {
        m.when_press(Key::F3).to(move |ctx| {
            st.store(true, Ordering::SeqCst);
            let r = ctx.delay(Duration::from_secs(30));
            i.store(matches!(r, Err(Error::Interrupted)), Ordering::SeqCst);
            r
        });
    });
    svc.dispatcher().dispatch(&KeyEvent::down(Key::F3));
    assert!(wait_for(|| started.load(Ordering::SeqCst)));
    svc.stop();
    assert!(svc.wait_stopped(Duration::from_secs(5)));
    assert!(interrupted.load(Ordering::SeqCst));
    assert!(svc.registry().is_empty());
    assert!(matches!(svc.start(), Err(Error::ShutDown)));
}

#[test]
fn invalid_config_is_refused() {
    let config = Config {
        executor: ExecutorConfig {
            min_workers: 5,
            max_workers: 1,
            ..ExecutorConfig::default()
        },
        require_key: true,
    };
    assert!(matches!(
        MacroService::with_backends(
            config,
            Arc::new(MockWindowQuery::new()),
            Synthesizer::with_poster(Arc::new(RecordingPoster::new())),
        ),
        Err(Error::Config(_))
    ));
}

#[cfg(not(windows))]
#[test]
fn start_reports_missing_hook_support() {
    let (svc, _) = service();
    assert!(matches!(
        svc.start(),
        Err(Error::Hook(win_hook::Error::Unsupported))
    ));
    assert!(!svc.is_running());
}
