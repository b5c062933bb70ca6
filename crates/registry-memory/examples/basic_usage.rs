use courier_registry::{Node, Registry, Service};
use courier_registry_memory::MemoryRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = MemoryRegistry::new();

    registry.register(
        Service::new("orders", "1.0.0")
            .with_node(Node::new("orders-1", "127.0.0.1:9001").with_metadata("zone", "a"))
            .with_node(Node::new("orders-2", "127.0.0.1:9002").with_metadata("zone", "b")),
    );
    registry.register(
        Service::new("orders", "2.0.0").with_node(Node::new("orders-3", "127.0.0.1:9003")),
    );

    for service in registry.lookup("orders").await? {
        println!("{} {}:", service.name, service.version);
        for node in &service.nodes {
            println!("  - {node} {:?}", node.metadata());
        }
    }

    Ok(())
}
