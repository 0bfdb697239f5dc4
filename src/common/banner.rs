use colored::*;

pub fn show() {
    let banner = r#"
    ███████╗███████╗██╗  ██╗██████╗ ██████╗ ██╗   ██╗████████╗███████╗
    ██╔════╝██╔════╝██║  ██║██╔══██╗██╔══██╗██║   ██║╚══██╔══╝██╔════╝
    ███████╗███████╗███████║██████╔╝██████╔╝██║   ██║   ██║   █████╗
    ╚════██║╚════██║██╔══██║██╔══██╗██╔══██╗██║   ██║   ██║   ██╔══╝
    ███████║███████║██║  ██║██████╔╝██║  ██║╚██████╔╝   ██║   ███████╗
    ╚══════╝╚══════╝╚═╝  ╚═╝╚═════╝ ╚═╝  ╚═╝ ╚═════╝    ╚═╝   ╚══════╝
    "#;

    println!("{}", banner.bright_red());
    println!(
        "    {}",
        "A concurrent OpenSSH credential auditing tool written in Rust".bright_yellow()
    );
    println!("    {}", "Version: 0.1.0".bright_yellow());
    println!();
}
