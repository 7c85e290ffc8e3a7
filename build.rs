use vergen_gitcl::{Emitter, GitclBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Emits VERGEN_GIT_DESCRIBE for the version string. Outside a git
    // checkout this falls back to the idempotent placeholder, which
    // version_str() in main.rs detects.
    let gitcl = GitclBuilder::all_git()?;
    Emitter::default().add_instructions(&gitcl)?.emit()?;
    Ok(())
}
