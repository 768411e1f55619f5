//! Cranelift JIT driver: one native function per call.
//!
//! # Zero-Partial-Output Policy
//!
//! If the body closure fails for ANY reason, the function is discarded
//! before definition and the error is returned. No native code exists for a
//! function whose lowering hit an invariant violation.

use std::time::Instant;

use cranelift_codegen::ir::{AbiParam, Function, UserFuncName};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Linkage, Module};
use tracing::{debug, error, info};

use super::function::JitFunction;
use super::helpers::{register_symbols, MathHelperIds};
use crate::error::{JitError, JitResult};
use crate::types::JitTypeTag;
use cider_config::JitConfig;

/// A JIT-compiled function. Owns the Cranelift module (code memory) and holds
/// the raw function pointer.
pub struct JitFn {
    _module: JITModule,
    ptr: *const u8,
    name: String,
    code_size: usize,
}

// SAFETY: JITModule owns the code memory. ptr is valid for the module's lifetime.
unsafe impl Send for JitFn {}
unsafe impl Sync for JitFn {}

impl JitFn {
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the emitted machine code in bytes.
    pub fn code_size(&self) -> usize {
        self.code_size
    }

    /// Reinterprets the code pointer as a function pointer.
    ///
    /// # Safety
    ///
    /// `F` must be an `extern "C" fn` type whose parameters and return match
    /// the signature the function was compiled with, and the returned
    /// pointer must not be called after `self` is dropped.
    pub unsafe fn as_fn<F: Copy>(&self) -> F {
        debug_assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*const u8>(),
            "as_fn: F must be a function pointer"
        );
        std::mem::transmute_copy(&self.ptr)
    }
}

/// Compiles one function with the given signature.
///
/// `body` lowers the function through its [`JitFunction`] and must end with
/// [`JitFunction::create_return`].
///
/// # Errors
///
/// Returns the first error raised by `body`, `MissingReturn` if it never
/// returned, and backend errors from Cranelift. In every error case the
/// compilation is logged as aborted and no code is produced.
pub fn compile_function<F>(
    config: &JitConfig,
    name: &str,
    params: &[JitTypeTag],
    ret: JitTypeTag,
    body: F,
) -> JitResult<JitFn>
where
    F: FnOnce(&JitFunction<'_>) -> JitResult<()>,
{
    let start = Instant::now();
    info!(
        event = "compile_start",
        function = name,
        param_count = params.len() as u64,
        "compiling function"
    );
    match build_function(config, name, params, ret, body) {
        Ok(jit_fn) => {
            info!(
                event = "compile_end",
                function = name,
                code_size = jit_fn.code_size as u64,
                duration_us = start.elapsed().as_micros() as u64,
                "compiled function"
            );
            Ok(jit_fn)
        }
        Err(e) => {
            error!(
                event = "compile_abort",
                function = name,
                error = %e,
                "compilation aborted"
            );
            Err(e)
        }
    }
}

fn make_jit_module(config: &JitConfig) -> JitResult<JITModule> {
    let mut flag_builder = settings::builder();
    let mut set = |key: &str, value: &str| {
        flag_builder
            .set(key, value)
            .map_err(|e| JitError::Isa(format!("setting {key}={value}: {e}")))
    };
    set("use_colocated_libcalls", "false")?;
    set("is_pic", "false")?;
    set("opt_level", config.opt_level.as_setting())?;
    set(
        "enable_verifier",
        if config.enable_verifier { "true" } else { "false" },
    )?;

    let isa_builder =
        cranelift_native::builder().map_err(|e| JitError::Isa(format!("ISA builder: {e}")))?;
    let isa = isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(|e| JitError::Isa(format!("ISA finish: {e}")))?;
    let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    register_symbols(&mut builder);
    Ok(JITModule::new(builder))
}

#[allow(clippy::result_large_err)]
fn build_function<F>(
    config: &JitConfig,
    name: &str,
    params: &[JitTypeTag],
    ret: JitTypeTag,
    body: F,
) -> JitResult<JitFn>
where
    F: FnOnce(&JitFunction<'_>) -> JitResult<()>,
{
    let mut module = make_jit_module(config)?;
    let ptr_type = module.target_config().pointer_type();

    let mut sig = module.make_signature();
    for (index, &tag) in params.iter().enumerate() {
        let ty = tag.ir_type(ptr_type).ok_or_else(|| JitError::UnsizedType {
            name: format!("arg{index}"),
            tag,
        })?;
        sig.params.push(AbiParam::new(ty));
    }
    if let Some(ty) = ret.ir_type(ptr_type) {
        sig.returns.push(AbiParam::new(ty));
    }

    let func_id = module.declare_function(name, Linkage::Local, &sig)?;
    let helper_ids = MathHelperIds::declare(&mut module)?;
    let mut func = Function::with_name_signature(UserFuncName::user(0, func_id.as_u32()), sig);
    let helpers = helper_ids.import(&mut module, &mut func);
    let mut func_ctx = FunctionBuilderContext::new();

    let emitted = {
        let mut builder = FunctionBuilder::new(&mut func, &mut func_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);
        let args = builder.block_params(entry).to_vec();

        let jit_func = JitFunction::new(
            name,
            builder,
            helpers,
            ptr_type,
            params.to_vec(),
            args,
            ret,
        );
        body(&jit_func)?;
        jit_func.finish()?
    };

    if config.log_ir {
        debug!(function = name, ir = %func.display(), "generated IR");
    }
    debug!(function = name, emitted = emitted as u64, "lowered function body");

    let mut ctx = Context::for_function(func);
    module
        .define_function(func_id, &mut ctx)
        .map_err(|e| JitError::Codegen(format!("{e:?}")))?;
    let code_size = ctx
        .compiled_code()
        .map_or(0, |code| code.code_buffer().len());
    module.clear_context(&mut ctx);
    module
        .finalize_definitions()
        .map_err(|e| JitError::Codegen(e.to_string()))?;

    let ptr = module.get_finalized_function(func_id);
    Ok(JitFn {
        _module: module,
        ptr,
        name: name.to_string(),
        code_size,
    })
}
