use libc;

pub const ETH_P_ALL: libc::c_int = 0x0003;

pub const SIOCGIFINDEX: libc::c_ulong = 0x8933;

pub const SIOCGIFHWADDR: libc::c_ulong = 0x8927;

#[repr(C)]
#[derive(Clone, Copy)]
pub union c_ifru {
    pub ifr_ifindex: libc::c_int,
    pub ifr_hwaddr: libc::sockaddr,
    pub ifr_pad: [u8; 24],
}

/// [https://linux.die.net/man/7/netdevice](https://linux.die.net/man/7/netdevice)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct c_ifreq {
    pub ifr_name: [libc::c_char; libc::IF_NAMESIZE],
    pub ifr_ifru: c_ifru,
}

impl c_ifreq {
    pub fn with_name(ifr_name: &str) -> c_ifreq {
        assert!(ifr_name.len() <= libc::IF_NAMESIZE);

        let mut ifreq = c_ifreq {
            ifr_name: [0; libc::IF_NAMESIZE],
            ifr_ifru: c_ifru { ifr_pad: [0; 24] },
        };

        for (i, c) in ifr_name.as_bytes().iter().enumerate() {
            ifreq.ifr_name[i] = *c as libc::c_char;
        }

        ifreq
    }
}
