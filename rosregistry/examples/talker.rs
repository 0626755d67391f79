use rosregistry::Node;
use std::time::Duration;

fn main() {
    env_logger::init();

    let node = Node::new("talker").unwrap();
    println!("Node {} serving at {}", node.name(), node.uri().unwrap());

    let topic = node.advertise("chatter", "std_msgs/String", 7878).unwrap();
    println!("Advertised {}; subscribers will negotiate over requestTopic", topic);

    loop {
        std::thread::sleep(Duration::from_secs(1));
    }
}
