mod error;
mod generator;

use tracing::debug;

use parser::ast::Program;

pub use error::{CompileError, GenError, GenResult};
pub use generator::GeneratorOptions;

/* Emits NASM source for a parsed program. */
pub fn generate<'a>(program: &Program<'a>, options: GeneratorOptions) -> GenResult<'a, String> {
    generator::Generator::new(options).generate(program)
}

/*
 * Whole pipeline, from source text to assembly. `file` only appears in
 * diagnostics.
 */
pub fn compile_source<'a>(file: &'a str, source: &str, options: GeneratorOptions) -> Result<String, CompileError<'a>> {
    let tokens = lexer::tokenize(file, source)?;
    let program = parser::parse(file, &tokens)?;
    let asm = generate(&program, options)?;

    debug!(source = file, lines = asm.lines().count(), "compiled");
    Ok(asm)
}
