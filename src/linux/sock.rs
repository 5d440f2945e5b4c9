use std;
use std::mem;

use libc;

use {
    Error,
    Result,
};
use core::repr::EthernetAddress;
use linux::libc as _libc;

/// [AF_PACKET](http://man7.org/linux/man-pages/man7/packet.7.html) socket
/// bound to one interface, for sending raw Ethernet frames.
pub struct RawSocket {
    fd: libc::c_int,
    eth_addr: EthernetAddress,
}

impl RawSocket {
    /// Opens a raw socket bound to the named interface and reads the
    /// interface's hardware address off it.
    pub fn open(ifr_name: &str) -> Result<RawSocket> {
        unsafe {
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (_libc::ETH_P_ALL as u16).to_be() as libc::c_int,
            );

            if fd == -1 {
                return Err(Error::IO(std::io::Error::last_os_error()));
            }

            let mut ifreq = _libc::c_ifreq::with_name(ifr_name);
            if libc::ioctl(fd, _libc::SIOCGIFINDEX, &mut ifreq as *mut _libc::c_ifreq) == -1 {
                let err = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(Error::IO(err));
            }
            let ifindex = ifreq.ifr_ifru.ifr_ifindex;

            let mut ifreq = _libc::c_ifreq::with_name(ifr_name);
            if libc::ioctl(fd, _libc::SIOCGIFHWADDR, &mut ifreq as *mut _libc::c_ifreq) == -1 {
                let err = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(Error::IO(err));
            }

            let mut hw_addr: [u8; 6] = [0; 6];
            for i in 0 .. 6 {
                hw_addr[i] = ifreq.ifr_ifru.ifr_hwaddr.sa_data[i] as u8;
            }

            let mut sll: libc::sockaddr_ll = mem::zeroed();
            sll.sll_family = libc::AF_PACKET as u16;
            sll.sll_protocol = (_libc::ETH_P_ALL as u16).to_be();
            sll.sll_ifindex = ifindex;

            if libc::bind(
                fd,
                &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            ) == -1
            {
                let err = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(Error::IO(err));
            }

            Ok(RawSocket {
                fd,
                eth_addr: EthernetAddress::new(hw_addr),
            })
        }
    }

    /// Returns the hardware address of the bound interface.
    pub fn ethernet_addr(&self) -> EthernetAddress {
        self.eth_addr
    }

    /// Writes one raw Ethernet frame to the interface.
    pub fn send(&mut self, buffer: &[u8]) -> Result<()> {
        unsafe {
            let wrote = libc::send(
                self.fd,
                buffer.as_ptr() as *const libc::c_void,
                buffer.len(),
                0,
            );

            if wrote < 0 {
                Err(Error::IO(std::io::Error::last_os_error()))
            } else {
                Ok(())
            }
        }
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
