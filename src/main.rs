use log::info;
use rank_treap::{Result, Treap};

#[derive(Debug)]
struct Record {
    foo: u32,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut t = Treap::new();

    t.insert(5, Some(Record { foo: 12 }))?;
    t.insert(2, Some(Record { foo: 8 }))?;
    t.insert(7, Some(Record { foo: 1000 }))?;

    let a = t.find(&5)?.map(|node| {
        info!("found {} with foo {:?}", node.key(), node.data().map(|record| record.foo));
        node.id()
    });
    if let Some(node) = t.find_rank(1) {
        info!("rank 1 is {} {:?}", node.key(), node.data());
    }

    if let Some(id) = a {
        t.remove_node(&id)?;
        info!("removed 5 by reference");
    }
    t.remove(&7)?;
    info!("removed 7 by key");

    println!("{}", t.size());
    Ok(())
}
