use colscan::{
    DataType, FieldAccessor, IntBetweenRequest, IntRequest, StoreBuilder, StringLikeRequest, Value,
};
use log::info;

#[derive(Debug, Clone)]
struct Trade {
    id: i64,
    desk: i16,
    flags: Vec<i8>,
    book: Option<String>,
}

fn accessor() -> FieldAccessor<Trade> {
    FieldAccessor::new(|values: Vec<Value>| match values.as_slice() {
        [Value::Int64(id), Value::Int16(desk), Value::MultiInt8(flags), book] => Ok(Trade {
            id: *id,
            desk: *desk,
            flags: flags.clone(),
            book: book.as_str().map(str::to_string),
        }),
        other => Err(format!("cannot rebuild trade from {other:?}")),
    })
    .field("id", |t: &Trade| Ok(t.id.into()))
    .field("desk", |t: &Trade| Ok(t.desk.into()))
    .field("flags", |t: &Trade| Ok(t.flags.clone().into()))
    .field("book", |t: &Trade| Ok(t.book.as_deref().into()))
}

fn main() -> Result<(), colscan::StoreError> {
    env_logger::init();

    let mut store = StoreBuilder::new()
        .column("id", DataType::Int64)
        .column("desk", DataType::Int16)
        .column("flags", DataType::MultiInt8)
        .column("book", DataType::CompressedString)
        .build(accessor())?;

    let trades: Vec<Trade> = (0..100_000)
        .map(|i| Trade {
            id: i,
            desk: (i % 40) as i16,
            flags: (0..(i % 3)).map(|f| f as i8).collect(),
            book: (i % 11 != 0).then(|| format!("Book-{}", i % 17)),
        })
        .collect();
    store.append(&trades)?;
    info!("loaded {} rows into {} blocks", store.size(), store.blocks().len());

    let desk = IntBetweenRequest::new("desk", 10, 12);
    let flagged = IntRequest::new("flags", [1]);
    let book = StringLikeRequest::new("book", ["k-1"]);

    let selected = store.select(&[&desk, &flagged, &book])?;
    println!("{} trades on desks 10..=12 flagged 1 in books like 'k-1'", selected.len());
    if let Some(first) = selected.first() {
        println!("first: {first:?}");
    }

    println!("per desk:");
    for (desk, count) in store.group_count(&[&flagged, &book], "desk")? {
        if let Some(desk) = desk.as_int().filter(|d| *d < 5) {
            println!("  {desk:<4} {count}");
        }
    }

    println!("memory: {} bytes", store.memory_usage());
    Ok(())
}
