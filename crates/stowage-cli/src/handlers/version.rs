//! Version command handler.

pub fn execute() {
    println!("{}", stowage_build_info::version_line());
}
