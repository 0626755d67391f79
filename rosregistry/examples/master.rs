use rosregistry::api::resolve;
use rosregistry::Master;

fn main() {
    env_logger::init();

    let master = Master::new(&resolve::hostname(), "0.0.0.0", 11311).unwrap();
    println!("Master serving at {}", master.uri());

    loop {
        std::thread::park();
    }
}
