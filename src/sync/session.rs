//! One enabled span of register sharing under a session name

use std::fmt::Write as _;

use log::{debug, warn};

use crate::{
    config::SyncConfig,
    error::Result,
    layout::SharedLayout,
    memory::{MutexGuard, NamedMutex, ObjectNames, SharedRegion},
    registers::RegisterStore,
};

use super::{dump, engine::SyncEngine, plan::PublishPlan};

/// Handles to the named mutex and region of a session, plus the version
/// this process last synchronized to.
///
/// Dropping a session releases both handles; the shared objects themselves
/// stay for other processes.
#[derive(Debug)]
pub struct Session {
    name: String,
    names: ObjectNames,
    mutex: NamedMutex,
    region: SharedRegion,
    engine: SyncEngine,
}

impl Session {
    /// Open or create the objects of `name` and attach to them.
    ///
    /// The process that creates the region lays out its local table as the
    /// initial contents. A region created here is removed again when its
    /// initialization fails.
    pub fn open(name: &str, config: &SyncConfig, store: &RegisterStore) -> Result<Self> {
        config.validate()?;
        let names = ObjectNames::derive(name, &config.object_dir())?;

        let mutex = NamedMutex::open(&names.mutex_path, config.permissions)?;
        let guard = mutex.lock()?;

        let mut region = SharedRegion::open(
            &names.region_path,
            config.initial_size,
            config.max_size,
            config.permissions,
        )?;
        let mut engine = SyncEngine::new();

        let attached = Self::attach_or_initialize(&guard, &mut engine, &mut region, store, config);
        if let Err(e) = attached {
            if region.created_by_us() {
                if let Err(remove_err) = region.remove() {
                    warn!("Failed to remove half-initialized region: {}", remove_err);
                }
            }
            return Err(e);
        }
        guard.unlock()?;

        debug!(
            "Enabled register session '{}' at {}",
            name,
            names.region_path.display()
        );
        Ok(Self {
            name: name.to_string(),
            names,
            mutex,
            region,
            engine,
        })
    }

    fn attach_or_initialize(
        guard: &MutexGuard<'_>,
        engine: &mut SyncEngine,
        region: &mut SharedRegion,
        store: &RegisterStore,
        config: &SyncConfig,
    ) -> Result<()> {
        if region.created_by_us() || engine.is_blank(guard, region)? {
            let plan = engine.initialize(guard, region, store, config)?;
            debug!("Initialized shared registers ({:?})", plan);
        } else {
            engine.attach(guard, region)?;
        }
        Ok(())
    }

    /// Run `f` inside the critical section
    fn critical<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&MutexGuard<'_>, &mut SyncEngine, &mut SharedRegion) -> Result<T>,
    {
        let guard = self.mutex.lock()?;
        let result = f(&guard, &mut self.engine, &mut self.region);
        let unlocked = guard.unlock();
        let value = result?;
        unlocked?;
        Ok(value)
    }

    /// Publish the local table to the shared region
    pub fn publish(&mut self, store: &RegisterStore, config: &SyncConfig) -> Result<PublishPlan> {
        self.critical(|guard, engine, region| engine.publish(guard, region, store, config))
    }

    /// Pull registers changed by other processes into the local table
    pub fn refresh(&mut self, store: &mut RegisterStore) -> Result<usize> {
        self.critical(|guard, engine, region| engine.refresh(guard, region, store))
    }

    /// Render the session state and the shared area into `out`
    pub fn dump_shared(&mut self, out: &mut String) -> Result<()> {
        let name = self.name.clone();
        self.critical(|guard, engine, region| {
            let header = engine.attach(guard, region)?;
            let _ = writeln!(
                out,
                "| session name={}, region={}, local_write_counter={}",
                name,
                region.path().display(),
                engine.local_write_counter()
            );
            dump::render_shared(out, &header, &SharedLayout::new(region.as_slice()));
            Ok(())
        })
    }

    /// Session name given at enable time
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Paths of the backing objects
    pub fn object_names(&self) -> &ObjectNames {
        &self.names
    }

    /// Global write counter this process last synchronized to
    pub fn local_write_counter(&self) -> u64 {
        self.engine.local_write_counter()
    }

    /// Committed size of the region as of the last critical section
    pub fn mapped_size(&self) -> usize {
        self.region.len()
    }

    /// Whether this process created the region
    pub fn created_region(&self) -> bool {
        self.region.created_by_us()
    }
}
