use jrender_core::{RenderError, RendererFactory};

fn main() -> Result<(), RenderError> {
    let factory = RendererFactory::new();
    let mut r = factory.buffered();

    r.object()?
        .key("menu")?
        .array()?
        .value("kake udon")?
        .value("kitsune udon")?
        .value("tempura udon")?
        .end_array()?
        .key("open")?
        .value(true)?
        .end_object()?;

    println!("{}", r.build()?);
    Ok(())
}
