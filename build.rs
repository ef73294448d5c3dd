use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=tailwind.css");
    println!("cargo:rerun-if-changed=src/ui");

    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let output_css = Path::new(manifest_dir).join("assets/tailwind.css");

    // Run tailwindcss to generate CSS (using locally installed version)
    let output = Command::new("npx")
        .arg("tailwindcss")
        .args(["-i", "tailwind.css", "-o", "assets/tailwind.css"])
        .current_dir(manifest_dir)
        .output();

    match output {
        Ok(output) if output.status.success() => {
            println!("cargo:warning=Tailwind CSS generated successfully");
        }
        Ok(output) => {
            println!("cargo:warning=Failed to generate Tailwind CSS");
            println!(
                "cargo:warning=STDERR: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Err(e) => {
            println!("cargo:warning=Failed to run tailwindcss: {}", e);
        }
    }

    // asset!() needs the file to exist even without a Tailwind toolchain
    if !output_css.exists() {
        let _ = std::fs::write(&output_css, "/* generated by tailwindcss */\n");
    }
}
