//! Module loading.
//!
//! Loading walks module specs depth-first, requires before dependents,
//! applying registration and config blocks against the provider scope as
//! they are found. Run blocks are collected and only run once the whole
//! batch is configured.

use tracing::{debug, trace};

use crate::error::DiResult;
use crate::injectable::Injectable;
use crate::module::{module_error, ModuleSnapshot, ModuleSpec};

use super::Injector;

/// A collected run block and the module it came from.
pub(crate) struct RunBlock {
    pub(crate) module: String,
    pub(crate) block: Injectable,
}

/// Loads `specs` into the injector behind `providers` and returns the run
/// blocks found, in discovery order.
pub(crate) fn load_modules(providers: &Injector, specs: &[ModuleSpec]) -> DiResult<Vec<RunBlock>> {
    let mut run_blocks = Vec::new();
    for spec in specs {
        load_spec(providers, spec, &mut run_blocks)?;
    }
    Ok(run_blocks)
}

fn load_spec(providers: &Injector, spec: &ModuleSpec, run_blocks: &mut Vec<RunBlock>) -> DiResult<()> {
    match spec {
        ModuleSpec::Named(name) => load_named(providers, name, run_blocks),
        ModuleSpec::Block(block) => {
            let label = block.display_name();
            trace!(module = %label, "invoking ad-hoc block");
            let result = providers
                .invoke(block, None, None)
                .map_err(|e| module_error(&label, e))?;
            if let Some(unit) = result.as_ref().and_then(|v| v.downcast_ref::<Injectable>()) {
                run_blocks.push(RunBlock {
                    module: label,
                    block: unit.clone(),
                });
            }
            Ok(())
        }
        ModuleSpec::List(specs) => {
            for spec in specs {
                load_spec(providers, spec, run_blocks)?;
            }
            Ok(())
        }
    }
}

fn load_named(providers: &Injector, name: &str, run_blocks: &mut Vec<RunBlock>) -> DiResult<()> {
    let inner = providers.inner();
    if inner.is_loaded(name) {
        trace!(module = name, "already loaded");
        return Ok(());
    }
    let module = inner.registry.module(name).map_err(|e| module_error(name, e))?;
    inner.mark_loaded(name, module.clone());
    debug!(module = name, "loading module");

    let snapshot = module.snapshot();
    configure(providers, name, &snapshot, run_blocks).map_err(|e| module_error(name, e))?;

    run_blocks.extend(snapshot.run_blocks.into_iter().map(|block| RunBlock {
        module: name.to_string(),
        block,
    }));
    Ok(())
}

fn configure(
    providers: &Injector,
    name: &str,
    snapshot: &ModuleSnapshot,
    run_blocks: &mut Vec<RunBlock>,
) -> DiResult<()> {
    for required in &snapshot.requires {
        load_named(providers, required, run_blocks)?;
    }
    for block in &snapshot.blocks {
        trace!(module = name, kind = ?block.kind, target = ?block.target, "applying block");
        block.apply(providers)?;
    }
    Ok(())
}

/// Runs collected run blocks against the instance scope, in order.
pub(crate) fn run_blocks(instances: &Injector, blocks: Vec<RunBlock>) -> DiResult<()> {
    for RunBlock { module, block } in blocks {
        trace!(module = %module, "running run block");
        instances
            .invoke(&block, None, None)
            .map_err(|e| module_error(&module, e))?;
    }
    Ok(())
}
