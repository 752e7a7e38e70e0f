//! Sets the package name used for on-disk paths
fn main() {
    // name of the directory under the user config dir holding table.json,
    // renaming it orphans any installed table
    println!("cargo::rustc-env=TWINSYNC_PKG_NAME=twinsync");
}
