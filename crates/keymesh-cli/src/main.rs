//! keymesh-ca - KeyMesh CA bootstrap and node provisioning

use std::process::ExitCode;

fn main() -> ExitCode {
    match keymesh_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            keymesh_cli::report::print(&err);
            ExitCode::from(keymesh_cli::report::exit_code(&err))
        }
    }
}
