//! Build script for compiling the telemetry protobuf definitions

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the bundled protoc so the build does not depend on a system install
    let mut config = prost_build::Config::new();
    config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);

    config.compile_protos(&["proto/tracker_data.proto"], &["proto/"])?;

    println!("cargo:rerun-if-changed=proto/tracker_data.proto");

    Ok(())
}
