//! Process-wide engine handle: owns the registry, action pool and hook.
use std::{
    any::{TypeId, type_name},
    collections::HashSet,
    sync::Arc,
    time::Duration,
};

use keysynth::Synthesizer;
use parking_lot::Mutex;
use tracing::{debug, info};
use win_hook::{Hook, KeySink};
use winops::{SystemWindows, WindowQuery};

use crate::{
    Config, Dispatcher, Error, Executor, ExecutorStats, MacroScope, Result, rule::Registry,
};

/// A set of rules declared together.
///
/// `declare` runs once, when the macro is activated; the `Arc` lets actions
/// capture the macro's own state.
pub trait Macro: Send + Sync + 'static {
    /// Register this macro's rules.
    fn declare(self: Arc<Self>, m: &mut MacroScope);

    /// Name used to label the macro's rules.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

struct Inner {
    config: Config,
    registry: Arc<Registry>,
    executor: Executor,
    dispatcher: Arc<Dispatcher>,
    hook: Mutex<Option<Hook>>,
    activated: Mutex<HashSet<TypeId>>,
}

/// Handle to the macro engine. Clones share the same engine.
///
/// Declare rules with [`MacroService::activate`] / [`MacroService::use_macro`]
/// (or ad hoc with [`MacroService::declare`]), then [`MacroService::start`]
/// to install the keyboard hook.
#[derive(Clone)]
pub struct MacroService {
    inner: Arc<Inner>,
}

impl MacroService {
    /// Engine backed by the real desktop and input stream.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_backends(config, Arc::new(SystemWindows), Synthesizer::new())
    }

    /// Engine over explicit window and input backends.
    pub fn with_backends(
        config: Config,
        windows: Arc<dyn WindowQuery>,
        synth: Synthesizer,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(Registry::new());
        let executor = Executor::new(config.executor.clone())?;
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            windows,
            executor.clone(),
            synth,
        ));
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                registry,
                executor,
                dispatcher,
                hook: Mutex::new(None),
                activated: Mutex::new(HashSet::new()),
            }),
        })
    }

    /// Activate `M`'s default instance. Returns false if `M` was already active.
    pub fn activate<M: Macro + Default>(&self) -> bool {
        if self.is_active::<M>() {
            return false;
        }
        self.use_macro(M::default())
    }

    /// Activate `m`. Only the first instance of each macro type is declared;
    /// returns false for later ones.
    pub fn use_macro<M: Macro>(&self, m: M) -> bool {
        if !self.inner.activated.lock().insert(TypeId::of::<M>()) {
            debug!(name = m.name(), "macro_already_active");
            return false;
        }
        let m = Arc::new(m);
        let mut scope = MacroScope::new(
            self.inner.registry.clone(),
            m.name(),
            self.inner.config.require_key,
        );
        m.declare(&mut scope);
        info!(name = scope.name(), rules = scope.declared(), "macro_activated");
        true
    }

    /// True if a macro of type `M` has been activated.
    pub fn is_active<M: Macro>(&self) -> bool {
        self.inner.activated.lock().contains(&TypeId::of::<M>())
    }

    /// Declare rules outside any macro type, labelled with `name`.
    pub fn declare(&self, name: &str, f: impl FnOnce(&mut MacroScope)) -> usize {
        let mut scope = MacroScope::new(
            self.inner.registry.clone(),
            name,
            self.inner.config.require_key,
        );
        f(&mut scope);
        scope.declared()
    }

    /// Install the keyboard hook and start dispatching.
    pub fn start(&self) -> Result<()> {
        if !self.inner.executor.is_accepting() {
            return Err(Error::ShutDown);
        }
        let mut hook = self.inner.hook.lock();
        if hook.is_some() {
            return Ok(());
        }
        let sink: Arc<dyn KeySink> = self.inner.dispatcher.clone();
        *hook = Some(Hook::install(sink)?);
        info!(rules = self.inner.registry.len(), "macro_service_started");
        Ok(())
    }

    /// Remove the hook, stop the action pool and drop all rules.
    ///
    /// Running actions are interrupted at their next wait; the service cannot
    /// be restarted.
    pub fn stop(&self) {
        if let Some(hook) = self.inner.hook.lock().take() {
            hook.uninstall();
        }
        self.inner.executor.shutdown();
        self.inner.registry.clear();
        info!("macro_service_stopped");
    }

    /// True while the hook is installed.
    pub fn is_running(&self) -> bool {
        self.inner
            .hook
            .lock()
            .as_ref()
            .is_some_and(Hook::is_active)
    }

    /// The dispatcher the hook feeds; also usable directly to inject events.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.inner.dispatcher.clone()
    }

    /// The shared rule registry.
    pub fn registry(&self) -> Arc<Registry> {
        self.inner.registry.clone()
    }

    /// Action pool counters.
    pub fn stats(&self) -> ExecutorStats {
        self.inner.executor.stats()
    }

    /// Wait up to `timeout` for every action worker to exit after [`stop`](Self::stop).
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        self.inner.executor.wait_drained(timeout)
    }

    /// The configuration the service was built with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
