use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("framepipe {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: framepipe");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("target_family: {}", std::env::consts::FAMILY);
    println!("message_size: {}", framepipe_frame::MESSAGE_SIZE);
    println!(
        "pipe_namespace: {}",
        if cfg!(target_os = "linux") {
            "abstract"
        } else {
            "filesystem"
        }
    );
    println!("features: cli=true");

    Ok(SUCCESS)
}
