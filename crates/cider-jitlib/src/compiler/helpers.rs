//! Runtime helpers linked into every JIT module.
//!
//! Cranelift has no float remainder instruction, so `Frem` lowers to a call
//! to one of these.

use cranelift_codegen::ir::types::{F32, F64};
use cranelift_codegen::ir::{AbiParam, FuncRef, Function, Type};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module};

use crate::error::JitResult;

const FMOD_SYMBOL: &str = "cider_jit_fmod";
const FMODF_SYMBOL: &str = "cider_jit_fmodf";

/// C `fmod`: result has the sign of the dividend.
extern "C" fn cider_jit_fmod(a: f64, b: f64) -> f64 {
    a % b
}

extern "C" fn cider_jit_fmodf(a: f32, b: f32) -> f32 {
    a % b
}

pub(crate) fn register_symbols(builder: &mut JITBuilder) {
    builder.symbol(FMOD_SYMBOL, cider_jit_fmod as *const u8);
    builder.symbol(FMODF_SYMBOL, cider_jit_fmodf as *const u8);
}

/// Module-level declarations of the helpers.
pub(crate) struct MathHelperIds {
    fmod: FuncId,
    fmodf: FuncId,
}

impl MathHelperIds {
    pub(crate) fn declare(module: &mut JITModule) -> JitResult<Self> {
        Ok(Self {
            fmod: declare_binary(module, FMOD_SYMBOL, F64)?,
            fmodf: declare_binary(module, FMODF_SYMBOL, F32)?,
        })
    }

    /// Imports the helpers into `func` so its body can call them.
    pub(crate) fn import(&self, module: &mut JITModule, func: &mut Function) -> MathHelpers {
        MathHelpers {
            fmod: module.declare_func_in_func(self.fmod, func),
            fmodf: module.declare_func_in_func(self.fmodf, func),
        }
    }
}

/// Function-level references to the helpers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MathHelpers {
    pub(crate) fmod: FuncRef,
    pub(crate) fmodf: FuncRef,
}

fn declare_binary(module: &mut JITModule, name: &str, ty: Type) -> JitResult<FuncId> {
    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(ty));
    sig.params.push(AbiParam::new(ty));
    sig.returns.push(AbiParam::new(ty));
    Ok(module.declare_function(name, Linkage::Import, &sig)?)
}
