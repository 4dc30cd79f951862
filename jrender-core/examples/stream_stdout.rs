use std::io::{self, Write};

use jrender_core::{JsonRenderer, RenderError};

/// Streams one JSON document per order straight to stdout. Each top-level
/// end_object flushes, so lines appear as they complete.
fn main() -> Result<(), RenderError> {
    let stdout = io::stdout();

    for (id, dish) in [(1, "kake udon"), (2, "zaru soba"), (3, "ramen")] {
        let mut r = JsonRenderer::streaming(stdout.lock());
        r.object()?
            .key("order")?
            .value(id)?
            .key("dish")?
            .value(dish)?
            .end_object()?;
        let mut w = r.into_writer()?;
        writeln!(w)?;
    }

    Ok(())
}
