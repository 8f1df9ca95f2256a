use std::io::Write;
use std::time::Duration;
use x360_wireless::{ControllerState, Driver, DriverConfig};

const CHANNEL: i32 = 0;

fn main() -> x360_wireless::Result<()> {
    env_logger::init();

    let config = DriverConfig::load()?;
    let driver = Driver::open(config)?;
    println!("Use the triggers to rumble, press the guide button to quit");

    loop {
        let (state, changed) =
            driver.get_state_on_change_or_timeout(CHANNEL, Duration::from_millis(250));
        if changed {
            driver.set_rumble(CHANNEL, state.left_trigger, state.right_trigger);
        }
        print!("\r[{}] {}      ", if changed { " OK " } else { "IDLE" }, describe(&state));
        let _ = std::io::stdout().flush();

        if state.guide {
            break;
        }
    }

    driver.set_rumble(CHANNEL, 0, 0);
    println!();
    driver.shutdown();
    Ok(())
}

fn describe(s: &ControllerState) -> String {
    let flags = [
        ("UP", s.up),
        ("DWN", s.down),
        ("LFT", s.left),
        ("RHT", s.right),
        ("STR", s.start),
        ("BCK", s.back),
        ("LH", s.left_thumb),
        ("RH", s.right_thumb),
        ("LB", s.left_bumper),
        ("RB", s.right_bumper),
        ("XBX", s.guide),
        ("A", s.a),
        ("B", s.b),
        ("X", s.x),
        ("Y", s.y),
    ];
    let mut line: Vec<String> = flags
        .iter()
        .map(|(name, on)| format!("{}:{}", name, u8::from(*on)))
        .collect();
    line.push(format!("LT:{}", s.left_trigger));
    line.push(format!("RT:{}", s.right_trigger));
    line.push(format!("LSX:{}", s.thumb_lx));
    line.push(format!("LSY:{}", s.thumb_ly));
    line.push(format!("RSX:{}", s.thumb_rx));
    line.push(format!("RSY:{}", s.thumb_ry));
    line.join(", ")
}
