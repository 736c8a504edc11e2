//! Counter Example - state hooks driving host mutations
//!
//! This example demonstrates a full update cycle:
//! - Mounting a function component into an in-memory host
//! - Dispatching state updates from outside the render
//! - Inspecting the commit report and the host operations it issued
//! - Drawing each committed frame with the line-diffing terminal renderer
//!
//! Run with: RUST_LOG=spark_fiber=debug cargo run --example counter

use std::cell::RefCell;
use std::rc::Rc;

use spark_fiber::{
    component, create_container, element, unmount, Component, Dispatch, Frame, HostOp,
    MemoryHost, Props, RootHandle, TerminalRenderer,
};

type Setter = Rc<RefCell<Option<Dispatch<i32>>>>;

fn counter(setter: &Setter) -> Component {
    let setter = Rc::clone(setter);
    Component::new("Counter", move |props, hooks| {
        let (count, set_count) = hooks.use_state(|| 0);
        *setter.borrow_mut() = Some(set_count);

        let label = props
            .attr("label")
            .map(ToString::to_string)
            .unwrap_or_else(|| "count".to_string());
        let fg = if count % 2 == 0 { "cyan" } else { "yellow" };

        element("box")
            .attr("bold", true)
            .attr("fg", fg)
            .child(format!("{label}: {count}"))
            .into()
    })
}

fn draw(
    root: &RootHandle<MemoryHost>,
    renderer: &mut TerminalRenderer,
    screen: &mut Vec<u8>,
) -> spark_fiber::Result<()> {
    let container = root.container()?;
    let bytes = root
        .with_host(|host| renderer.render(screen, host, container))?
        .unwrap_or_default();
    let text = root.with_host(|host| Frame::from_host(host, container).plain_text())?;
    println!("  frame: {text:?} ({bytes} bytes of terminal output)");
    Ok(())
}

fn main() -> spark_fiber::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== spark-fiber Counter Example ===\n");

    let mut host = MemoryHost::new();
    let container = host.create_container();
    let root = create_container(host, container);

    let setter = Setter::default();
    let app = counter(&setter);
    let mut renderer = TerminalRenderer::new();
    let mut screen = Vec::new();

    // Mount
    let outcome = root.render(component(&app, Props::new().with_attr("label", "clicks")))?;
    println!("mount: {:?}", outcome.report());
    draw(&root, &mut renderer, &mut screen)?;

    let Some(set_count) = setter.borrow().clone() else {
        eprintln!("counter never rendered");
        return Ok(());
    };

    // Increment a few times
    for _ in 0..3 {
        root.with_host_mut(MemoryHost::take_ops)?;
        let outcome = set_count.update(|n| n + 1)?;
        let ops = root.with_host(|host| host.count_ops(HostOp::is_mutation))?;
        println!("increment: {:?} ({ops} host mutations)", outcome.report());
        draw(&root, &mut renderer, &mut screen)?;
    }

    // Setting the same value commits nothing
    let outcome = set_count.set(3)?;
    println!("same value: noop = {:?}", outcome.report().map(|r| r.is_noop()));

    // Unmount, then the old dispatcher is dead
    let outcome = unmount(&root)?;
    println!("unmount: {:?}", outcome.report());
    draw(&root, &mut renderer, &mut screen)?;
    println!("dispatch after unmount: {:?}", set_count.set(10).err());

    println!("\n=== Example Complete ===");
    Ok(())
}
