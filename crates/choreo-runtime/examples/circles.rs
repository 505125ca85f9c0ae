//! Circles entering and exiting, driven step-by-step.
//!
//! Each circle is wrapped in its own controller with an enter/exit pair:
//! enter grows the circle and settles its fill to grey, exit flashes it and
//! shrinks it away. The host loop advances the engine clock in fixed frames
//! and drives each controller, printing the attribute state as it evolves.

use std::rc::Rc;
use std::time::Duration;

use choreo_core::{Element, Keyframes, ManualEngine, Options, Target};
use choreo_runtime::{Animate, PresenceCell};

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

fn circle(engine: &ManualEngine, index: usize) -> (Animate, PresenceCell) {
    let child = Element::new(format!("circle#{index}"));
    let cell = PresenceCell::new();
    let ctl = Animate::builder(Rc::new(engine.clone()), child)
        .presence(cell.clone())
        .enter(|scope| async move {
            scope
                .animate(
                    Target::Owned,
                    Keyframes::new()
                        .set("fill", "cornflowerblue")
                        .set("r", 6.0)
                        .set("opacity", 1.0),
                    Options::new().duration(secs(1.2)),
                )?
                .await;
            scope
                .animate(Target::Owned, Keyframes::new().set("fill", "lightgrey"), Options::new())?
                .await;
            Ok(())
        })
        .exit(|scope| async move {
            scope
                .animate(Target::Owned, Keyframes::new().set("fill", "tomato"), Options::new())?
                .await;
            scope
                .animate(
                    Target::Owned,
                    Keyframes::new().set("opacity", 0.0).set("r", 0.0),
                    Options::new().duration(secs(1.2)),
                )?
                .await;
            Ok(())
        })
        .build();
    (ctl, cell)
}

fn main() {
    let engine = ManualEngine::new();
    let mut circles: Vec<(Animate, PresenceCell)> =
        (0..3).map(|i| circle(&engine, i)).collect();
    for (ctl, _) in &mut circles {
        ctl.mount();
        ctl.drive();
    }

    // Let every enter finish: 1.2s growth plus the default fill settle.
    for frame in 0..6 {
        engine.advance(secs(0.4));
        for (ctl, _) in &mut circles {
            ctl.drive();
        }
        println!("t={:.1}s", (frame + 1) as f64 * 0.4);
        for (ctl, _) in &circles {
            println!("  {:?} {:?}", ctl.child(), ctl.child().attrs());
        }
    }

    // Remove the middle circle; the host holds it in the tree until the
    // controller confirms.
    let (ctl, cell) = &mut circles[1];
    let gone = cell.clone();
    cell.begin_exit(move || println!("host removed {:?}", gone))
        .expect("first exit");
    ctl.notify_presence();
    ctl.drive();

    for _ in 0..5 {
        engine.advance(secs(0.4));
        for (ctl, _) in &mut circles {
            ctl.drive();
        }
    }
    println!("confirmed: {}", circles[1].1.is_confirmed());
}
