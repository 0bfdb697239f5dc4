use std::net::Ipv4Addr;
use std::str::FromStr;
use anyhow::{anyhow, Result};
use ipnetwork::Ipv4Network;

/// 把CIDR或IP范围展开为IP地址列表
pub fn expand(spec: &str) -> Result<Vec<Ipv4Addr>> {
    let mut ips = Vec::new();

    if spec.contains('/') {
        // CIDR格式 (192.168.1.0/24)
        parse_cidr(spec, &mut ips)?;
    } else if spec.contains('-') {
        // 范围格式 (192.168.1.1-192.168.1.254 或 192.168.1.1-254)
        parse_range(spec, &mut ips)?;
    } else {
        let ip = Ipv4Addr::from_str(spec).map_err(|_| anyhow!("Invalid IP address: {}", spec))?;
        ips.push(ip);
    }

    Ok(ips)
}

/// 解析CIDR格式
fn parse_cidr(cidr: &str, ips: &mut Vec<Ipv4Addr>) -> Result<()> {
    let network = Ipv4Network::from_str(cidr).map_err(|_| anyhow!("Invalid CIDR: {}", cidr))?;

    // 跳过网络地址和广播地址
    for ip in network.iter() {
        if ip != network.network() && ip != network.broadcast() {
            ips.push(ip);
        }
    }

    Ok(())
}

/// 解析IP范围格式
fn parse_range(range: &str, ips: &mut Vec<Ipv4Addr>) -> Result<()> {
    let parts: Vec<&str> = range.split('-').collect();
    if parts.len() != 2 {
        return Err(anyhow!("Invalid IP range: {}", range));
    }

    let start_ip = Ipv4Addr::from_str(parts[0].trim())
        .map_err(|_| anyhow!("Invalid start IP: {}", parts[0]))?;

    let end_ip = if parts[1].trim().contains('.') {
        // 完整IP地址
        Ipv4Addr::from_str(parts[1].trim()).map_err(|_| anyhow!("Invalid end IP: {}", parts[1]))?
    } else {
        // 只有最后一段 (192.168.1.1-254)
        let start_octets = start_ip.octets();
        let last_octet = parts[1]
            .trim()
            .parse::<u8>()
            .map_err(|_| anyhow!("Invalid end octet: {}", parts[1]))?;

        Ipv4Addr::new(
            start_octets[0],
            start_octets[1],
            start_octets[2],
            last_octet,
        )
    };

    let start_u32 = u32::from(start_ip);
    let end_u32 = u32::from(end_ip);

    if start_u32 > end_u32 {
        return Err(anyhow!(
            "Start IP is greater than end IP: {} > {}",
            start_ip,
            end_ip
        ));
    }

    for i in start_u32..=end_u32 {
        ips.push(Ipv4Addr::from(i));
    }

    Ok(())
}
