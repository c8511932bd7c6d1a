use core::{
    ffi::{c_char, CStr},
    slice,
};

use auxiliary_vector::{AuxiliaryVector, AuxiliaryVectorItem};
use environment_variables::Environment;

pub mod auxiliary_vector;
pub mod environment_variables;

/// The argument, environment and auxiliary blocks the kernel builds on the
/// initial stack, viewed in place.
pub struct ProcessImage<'a> {
    stack_pointer: *const usize,
    arguments: &'a [*const c_char],
    pub environment: Environment<'a>,
    pub auxiliary_vector: AuxiliaryVector<'a>,
}

impl<'a> ProcessImage<'a> {
    /// # Safety
    ///
    /// `stack_pointer` must point at `argc` of a kernel-style start-up block
    /// (argc, argv, NULL, envp, NULL, auxv, AT_NULL) that stays valid for
    /// `'a` and is accessed only through the returned value.
    pub unsafe fn from_stack_pointer(stack_pointer: *mut usize) -> Self {
        let argument_count = *stack_pointer;
        let argument_pointer = stack_pointer.add(1).cast::<*const c_char>();
        let environment_pointer = argument_pointer
            .add(argument_count + 1)
            .cast_mut()
            .cast::<*mut u8>();

        let environment = Environment::from_raw(environment_pointer);
        let auxiliary_vector = AuxiliaryVector::from_raw(
            environment_pointer
                .add(environment.len() + 1)
                .cast::<AuxiliaryVectorItem>(),
        );

        Self {
            stack_pointer,
            arguments: slice::from_raw_parts(argument_pointer, argument_count),
            environment,
            auxiliary_vector,
        }
    }

    /// Address of `argc`; the next program expects its stack pointer here.
    pub fn stack_pointer(&self) -> *const usize {
        self.stack_pointer
    }

    /// The null-terminated argument vector.
    pub fn argv(&self) -> *const *const c_char {
        self.arguments.as_ptr()
    }

    /// `argv[0]`, or a fixed name when the kernel passed no arguments.
    pub fn program_name(&self) -> &'a [u8] {
        match self.arguments.first() {
            Some(&name) if !name.is_null() => unsafe { CStr::from_ptr(name) }.to_bytes(),
            _ => b"nix-ld",
        }
    }
}
