//! Forward rendering demo.
//!
//! ```bash
//! forward_demo --backend dummy --max-frames 120 --entities 32
//! ```

use squared_app::{App, AppArgs, DefaultAppArgs};
use squared_demos::ForwardScene;

fn main() {
    let args = DefaultAppArgs::parse();
    let scene = ForwardScene::new(args.entities());
    if let Err(e) = App::new(scene, args).run() {
        log::error!("Forward demo failed: {e}");
        std::process::exit(1);
    }
}
